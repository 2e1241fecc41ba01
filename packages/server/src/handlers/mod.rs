pub mod health;
pub mod objects;
pub mod planet;
pub mod root;
pub mod storage;
pub mod todos;
pub mod users;
