use actix_web::HttpResponse;

use crate::routes::helpers::MessageBody;
use crate::session_state::TypedSession;

pub async fn logout(session: TypedSession) -> HttpResponse {
    session.log_out();
    HttpResponse::Ok().json(MessageBody {
        message: "Logout realizado com sucesso",
    })
}
