pub mod governance;
pub mod simulation;
