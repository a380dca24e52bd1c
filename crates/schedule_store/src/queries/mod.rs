pub mod calendar;
pub mod operator;
pub mod reference;
pub mod route;
pub mod service;
pub mod source;
pub mod stop;
pub mod trip;
