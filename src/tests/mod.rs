mod aliases;
mod login;
mod users;
