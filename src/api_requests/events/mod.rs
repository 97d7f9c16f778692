pub mod ticketmaster;
