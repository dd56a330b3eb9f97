#[rocket::launch]
fn launch() -> _ {
    classroom_core::rocket()
}
