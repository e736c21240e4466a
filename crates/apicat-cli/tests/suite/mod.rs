mod catalog;
mod fixtures;
mod index;
