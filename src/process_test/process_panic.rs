use calypso_tas::util::process::setup_process_exit_on_panic;

fn main() {
    setup_process_exit_on_panic();
    let _t = std::thread::Builder::new()
        .name("receiver".into())
        .spawn(|| {
            panic!("A panicking receiver thread should exit the process with code 1");
        });
    std::thread::sleep(std::time::Duration::from_millis(100));
    std::process::exit(0);
}
