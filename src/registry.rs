// Controller registry for the bundled route files.

use crate::controller::ControllerTable;
use crate::controllers::{
    AdminController, AppController, AuthController, HomeController, UserController,
};

/// Register every bundled controller into `table`.
pub fn register_all(table: &mut ControllerTable) {
    table
        .register::<HomeController>()
        .register::<UserController>()
        .register::<AuthController>()
        .register::<AdminController>()
        .register::<AppController>();
}

/// A table holding every bundled controller.
#[must_use]
pub fn controller_table() -> ControllerTable {
    let mut table = ControllerTable::new();
    register_all(&mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_actions_are_registered() {
        let table = controller_table();
        assert_eq!(
            table.controller_names(),
            vec![
                "AdminController",
                "AppController",
                "AuthController",
                "HomeController",
                "UserController"
            ]
        );
        let page = table.action("HomeController", "page").unwrap();
        assert_eq!(page.params()[0].name, "page");
        assert_eq!(page.params()[0].default, Some("home"));
        assert!(table.action("UserController", "api_create_user").is_ok());
        assert!(table.action("AuthController", "show_login_form").is_ok());
    }
}
