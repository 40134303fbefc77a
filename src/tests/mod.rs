mod collection;
mod detection;
