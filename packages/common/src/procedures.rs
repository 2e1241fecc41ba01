//! Paths of the RPC procedures exposed by the server.
//!
//! Every procedure is a `POST` under `/rpc/{namespace}/{procedure}` taking and
//! returning JSON.

pub const HEALTH_CONNECTION: &str = "/rpc/healthCheck/connection";
pub const HEALTH_KV: &str = "/rpc/healthCheck/kv";
pub const HEALTH_DB: &str = "/rpc/healthCheck/db";
pub const HEALTH_R2: &str = "/rpc/healthCheck/r2";

pub const USERS_GET: &str = "/rpc/users/getUsers";
pub const USERS_CREATE: &str = "/rpc/users/createUser";
pub const USERS_UPDATE: &str = "/rpc/users/updateUser";
pub const USERS_DELETE: &str = "/rpc/users/deleteUser";

pub const TODOS_GET: &str = "/rpc/todos/getTodos";
pub const TODOS_CREATE: &str = "/rpc/todos/createTodo";
pub const TODOS_UPDATE: &str = "/rpc/todos/updateTodo";
pub const TODOS_DELETE: &str = "/rpc/todos/deleteTodo";

pub const PLANET_LIST: &str = "/rpc/planet/list";

pub const STORAGE_PRESIGN: &str = "/rpc/storage/presign";
pub const STORAGE_LIST: &str = "/rpc/storage/list";
pub const STORAGE_DELETE: &str = "/rpc/storage/delete";

/// Route serving locally stored objects (filesystem backend only).
pub const LOCAL_OBJECTS: &str = "/objects";
