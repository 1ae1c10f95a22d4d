pub mod case;
pub mod replay;
