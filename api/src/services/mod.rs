pub mod cycle;
pub mod forecast;
pub mod resolver;
pub mod session;
pub mod temperatures;
pub mod upstream;
pub mod wunderground;
