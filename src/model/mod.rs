pub mod advance_payment;
pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod notification;
pub mod payroll;
pub mod role;
pub mod salary;
