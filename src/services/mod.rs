pub mod fires;
