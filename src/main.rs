#[rocket::launch]
fn rocket() -> _ {
    news_api::rocket()
}
