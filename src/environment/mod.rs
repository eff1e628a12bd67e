pub mod guard;
pub mod state;
