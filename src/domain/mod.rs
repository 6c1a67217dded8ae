pub mod signup_email;
