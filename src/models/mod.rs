pub mod bar;
pub mod forecast;
pub mod raw;
pub mod rules;
