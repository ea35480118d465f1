mod event_bus;
mod properties;
mod scenarios;
