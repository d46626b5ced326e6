mod common;
mod duplicates;
mod report;
mod service;
