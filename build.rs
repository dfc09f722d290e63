fn main() {
    // The ESP-IDF environment only exists for `*-espidf` targets (Xtensa and
    // RISC-V alike). Host builds and tests skip it.
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.ends_with("-espidf") {
        embuild::espidf::sysenv::output();
    }
}
