fn main() {
    promptbatch::app::cli::run();
}
