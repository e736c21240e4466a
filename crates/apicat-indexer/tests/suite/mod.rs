mod batch;
mod fixtures;
mod skips;
