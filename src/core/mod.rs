pub mod format;
pub mod interpreter;
pub mod playtest;
pub mod progress;
pub mod session;
pub mod validator;
