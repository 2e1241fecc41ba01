pub const GREETING: &str = "Hello nn stack server!";

pub async fn index() -> &'static str {
    GREETING
}
