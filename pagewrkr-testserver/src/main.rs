use std::net::SocketAddr;

use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut catalog_size = pagewrkr_testserver::DEFAULT_CATALOG_SIZE;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--catalog" => {
                let n = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--catalog requires a product count"))?;
                catalog_size = n.parse()?;
            }
            "-h" | "--help" => {
                eprintln!(
                    "pagewrkr-testserver\n\nUSAGE:\n  pagewrkr-testserver [--bind 127.0.0.1:0] [--catalog 10]\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = pagewrkr_testserver::TestServerStats::default();
    let app = pagewrkr_testserver::router(stats, catalog_size);

    println!("HTTP_URL=http://{addr}");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
    });

    serve.await?;
    Ok(())
}
