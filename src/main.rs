fn main() -> std::process::ExitCode {
    morgue_ledger_lib::run()
}
