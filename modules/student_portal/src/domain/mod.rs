pub mod forms;
pub mod service;
pub mod session;
pub mod view;
