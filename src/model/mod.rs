// File: ./src/model/mod.rs
pub mod adapter;
pub mod item;

pub use adapter::{format_time_lapsed, sender_class_name};
pub use item::{CalendarEntry, NewsAlert, NewsAlertLite, NewsEvent, NewsEventAlert, Sentence};
