pub mod api;
pub mod controller;
pub mod dispatcher;
pub mod poller;
