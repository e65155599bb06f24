fn main() {
    std::process::exit(nightly_updater_lib::run());
}
