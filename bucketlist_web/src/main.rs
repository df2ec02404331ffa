use dioxus_logger::tracing::{error, info, Level};

fn main() {
    // Init logger
    dioxus_logger::init(Level::INFO).expect("failed to init logger");
    info!("starting app");

    if let Err(err) = bucketlist_web::start() {
        error!(?err, "failed to start the bucket list");
    }
}
