mod common;
mod review;
mod wizard;
