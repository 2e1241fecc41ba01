use crate::common::{MAX_OBJECT_SIZE, TestApp, routes};

#[tokio::test]
async fn signed_upload_is_served_back() {
    let app = TestApp::spawn().await;
    let (url, key) = app.presign_one("notes.pdf", "application/pdf").await;

    let payload = b"%PDF-1.7 hello".to_vec();
    let put = app.put_bytes(&url, "application/pdf", payload.clone()).await;
    assert_eq!(put.status, 200, "{}", put.text);

    let res = app
        .client
        .get(app.url(&routes::object(&key)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.bytes().await.unwrap().to_vec(), payload);
}

#[tokio::test]
async fn tampered_signature_is_forbidden() {
    let app = TestApp::spawn().await;
    let (url, _) = app.presign_one("a.png", "image/png").await;

    let (base, sig) = url.split_once("signature=").unwrap();
    let flipped = if sig.starts_with('0') { "1" } else { "0" };
    let tampered = format!("{base}signature={flipped}{}", &sig[1..]);

    let res = app.put_bytes(&tampered, "image/png", vec![1, 2, 3]).await;
    res.assert_error(403, "FORBIDDEN");
}

#[tokio::test]
async fn signature_is_bound_to_its_key() {
    let app = TestApp::spawn().await;
    let (url, key) = app.presign_one("a.png", "image/png").await;
    let (_, other_key) = app.presign_one("b.png", "image/png").await;

    let redirected = url.replace(&key, &other_key);
    let res = app.put_bytes(&redirected, "image/png", vec![1]).await;
    res.assert_error(403, "FORBIDDEN");
}

#[tokio::test]
async fn expired_signature_is_forbidden() {
    let app = TestApp::spawn().await;
    let (url, _) = app.presign_one("a.png", "image/png").await;

    let (base, rest) = url.split_once("expires=").unwrap();
    let (_, tail) = rest.split_once('&').unwrap();
    let expired = format!("{base}expires=1&{tail}");

    let res = app.put_bytes(&expired, "image/png", vec![1]).await;
    res.assert_error(403, "FORBIDDEN");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let (url, key) = app.presign_one("big.png", "image/png").await;

    let res = app
        .put_bytes(&url, "image/png", vec![0u8; MAX_OBJECT_SIZE as usize + 1])
        .await;
    res.assert_error(413, "PAYLOAD_TOO_LARGE");

    let missing = app.get(&routes::object(&key)).await;
    missing.assert_error(404, "NOT_FOUND");
}
