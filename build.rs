fn main() {
    // doar pe ESP32 există variabilele de mediu ale esp-idf-sys
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
