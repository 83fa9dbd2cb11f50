fn main() {
    confscript::cli::run();
}
