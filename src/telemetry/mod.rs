pub mod poll_health;
