// src/app/mod.rs

pub mod main_resource;
