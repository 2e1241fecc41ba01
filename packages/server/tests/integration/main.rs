mod common;

mod health;
mod objects;
mod storage;
mod todos;
mod users;
