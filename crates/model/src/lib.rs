pub mod block;
pub mod calendar;
pub mod note;
pub mod operator;
pub mod route;
pub mod service;
pub mod source;
pub mod stop;
pub mod trip;
