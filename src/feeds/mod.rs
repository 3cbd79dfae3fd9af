pub mod opportunities;
