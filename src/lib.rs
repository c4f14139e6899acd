/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

pub mod config;

pub(crate) mod constants;

pub mod error;

pub mod application;

pub mod presentation;

pub mod session;

pub mod storage;

pub mod transport;

pub mod utils;
