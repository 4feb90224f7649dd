pub mod legislation;
