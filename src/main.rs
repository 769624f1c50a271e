#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

fn main() {
    chat_mentions::run();
}
