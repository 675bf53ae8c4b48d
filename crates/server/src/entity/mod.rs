pub mod open_event;
