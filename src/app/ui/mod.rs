mod controls;
mod panels;
mod summary;
