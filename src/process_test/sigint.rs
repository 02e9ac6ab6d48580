use calypso_tas::util::process::wait_for_signals;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Waiting for sigint");
    wait_for_signals().await.expect("Could not register signal handlers");
    println!("Received a sigint");
}
