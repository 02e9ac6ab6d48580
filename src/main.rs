fn main() {
    calypso_tas::run();
}
