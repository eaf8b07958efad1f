use aws_sdk_s3::Client;

/// Build an S3 client from the default AWS config.
pub async fn build_client() -> Client {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    Client::new(&config)
}

/// Build an S3 client against an S3-compatible endpoint (MinIO, LocalStack).
/// Path-style addressing is forced since such endpoints rarely serve
/// virtual-hosted buckets.
pub async fn build_client_with_endpoint(endpoint: &str) -> Client {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .endpoint_url(endpoint)
        .force_path_style(true)
        .build();
    Client::from_conf(s3_config)
}
