use crate::api::attendance::{CheckIn, CheckOut};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::api::payroll::{
    AdvanceLine, AdvanceWithName, CreateAdvance, GeneratePayroll, PayrollWithName,
    PayslipResponse, PayslipRow, UpsertSalary,
};
use crate::model::advance_payment::AdvancePayment;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveRequest;
use crate::model::payroll::PayrollRecord;
use crate::model::salary::SalaryProfile;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EMS API",
        version = "1.0.0",
        description = r#"
## Employee Management System (EMS)

This API powers an **Employee Management System** backend.

### 🔹 Key Features
- **Payroll Management**
  - Generate monthly payroll for all employees, with attendance-prorated
    deductions and advance-payment settlement
  - Maintain salary profiles and advance payments
  - View payroll records and payslips
- **Attendance Management**
  - Daily check-in and check-out tracking
- **Leave Management**
  - Apply for leave, approve/reject requests, and view leave history

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication**.
Payroll generation is restricted to the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::payroll::generate_payroll,
        crate::api::payroll::list_payroll,
        crate::api::payroll::employee_payroll,
        crate::api::payroll::payslip,
        crate::api::payroll::upsert_salary,
        crate::api::payroll::get_salary,
        crate::api::payroll::create_advance,
        crate::api::payroll::list_advances,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
    ),
    components(
        schemas(
            GeneratePayroll,
            UpsertSalary,
            CreateAdvance,
            PayrollWithName,
            PayrollRecord,
            PayslipRow,
            PayslipResponse,
            AdvanceLine,
            AdvanceWithName,
            CheckIn,
            CheckOut,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            Employee,
            SalaryProfile,
            Attendance,
            LeaveRequest,
            AdvancePayment
        )
    ),
    tags(
        (name = "Payroll", description = "Payroll generation and payslip APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;
