pub mod clock;
pub mod config;
pub mod run;
pub mod send;
pub mod session;
pub mod status;
