mod closure;
mod fixtures;
mod locators;
mod targets;
