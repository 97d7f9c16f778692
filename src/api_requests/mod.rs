pub mod cars;
pub mod email;
pub mod events;
pub mod flights;
pub mod hotels;
